// Some prebuilt transfer functions
// for datasets used in development.
// Every dataset needs its own, users should
// write their own to satisfy their needs.

pub mod transfer_functions;
