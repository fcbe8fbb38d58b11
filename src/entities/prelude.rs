pub use super::search_trends::Entity as SearchTrends;
