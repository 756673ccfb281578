/// A repository-level registration on the platform (its "target"). Owns zero
/// or more projects; may be empty after project deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTarget {
    pub id: String,
    pub display_name: String,
    pub integration_id: String,
    pub integration_type: String,
    pub created_at: String,
}
