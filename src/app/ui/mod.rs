mod details;
mod matrix;
mod panels;
