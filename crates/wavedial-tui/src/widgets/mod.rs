pub mod scrollable_list;
pub mod volume;
