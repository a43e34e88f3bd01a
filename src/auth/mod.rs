pub mod permissions;
pub mod session;

/// Permission required by the article-creation path.
pub const PERM_ADD_NEWS: &str = "add_news";
