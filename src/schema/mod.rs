pub mod character;
pub mod command;
pub mod reply;
pub mod track;
