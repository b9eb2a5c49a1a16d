//! Market data aggregate: bars, value objects, feed queries and the feed
//! repository trait.

pub mod entities;
pub mod query;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use query::*;
pub use repositories::*;
pub use value_objects::*;
