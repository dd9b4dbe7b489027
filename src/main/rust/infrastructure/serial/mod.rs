mod tokio_serial_channel;

pub use tokio_serial_channel::{TokioSerialChannel, TokioSerialReader, TokioSerialWriter};
