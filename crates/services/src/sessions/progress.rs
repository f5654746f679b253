/// Aggregated view of session progress, useful for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: i64,
    /// Seconds left on the active question, `0` between questions.
    pub time_remaining: u32,
    pub is_complete: bool,
}
