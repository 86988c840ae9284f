pub mod px6;
