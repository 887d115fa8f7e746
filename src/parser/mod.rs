pub mod duration;
pub mod listview;
pub mod spell_page;
