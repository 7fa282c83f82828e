pub mod board;
pub mod card;
pub mod completion;
pub mod contents;
pub mod copy_buffer;
pub mod geometry;
pub mod grid;
pub mod map;
pub mod message_log;
pub mod numbering;
pub mod record;
pub mod resource;
pub mod stack;
pub mod table;
pub mod undo;
