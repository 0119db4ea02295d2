pub mod night;
pub mod observation;
pub mod tile;
pub mod time;


pub use night::*;
pub use observation::*;
pub use tile::*;
pub use time::*;
