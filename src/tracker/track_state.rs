/// Lifecycle state of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectState {
    /// Registered and still being matched (possibly with a non-zero disappeared-count)
    #[default]
    Active,
    /// Retired, waiting for the consumer to drain it
    Finished,
}
