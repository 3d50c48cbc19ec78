pub mod position;
pub mod route;

pub use position::Position;
pub use route::RouteStats;
