pub mod cancellation;
pub mod paths;

pub use cancellation::CancellationToken;
