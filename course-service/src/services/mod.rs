pub mod access;
pub mod grants;
pub mod jwt;
pub mod metrics;
pub mod orders;
pub mod razorpay;
pub mod repository;

pub use access::AccessService;
pub use grants::GrantService;
pub use jwt::JwtService;
pub use metrics::{init_metrics, render_metrics};
pub use orders::OrderService;
pub use razorpay::RazorpayClient;
pub use repository::CourseStore;
