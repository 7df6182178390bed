pub mod access;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod password_reset;
pub mod progress;
pub mod user;
pub mod voucher;

pub use access::can_access;
pub use course::*;
pub use enrollment::*;
pub use lesson::*;
pub use password_reset::*;
pub use progress::*;
pub use user::*;
pub use voucher::*;
