// Integration tests over the public API

mod fuzz;
mod identities;
mod properties;
mod rendering;
