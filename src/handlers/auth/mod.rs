pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;
pub mod utils;

pub use login::login;
pub use logout::logout;
pub use refresh::refresh;
pub use register::register;
