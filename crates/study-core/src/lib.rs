pub mod cursor;
pub mod move_record;
pub mod rules;
pub mod tree;
pub mod view;
