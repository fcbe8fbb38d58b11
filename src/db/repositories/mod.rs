pub mod trends;
