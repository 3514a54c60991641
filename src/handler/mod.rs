pub mod accounting;
pub mod margin;
pub mod position_close;
