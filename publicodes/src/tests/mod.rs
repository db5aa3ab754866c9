
mod resolution;

mod mechanisms;
mod null_propagation;
