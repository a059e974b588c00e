mod session;

pub use session::{read_range, UploadSession};
