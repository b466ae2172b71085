// Application layer: wires configuration to adapters and the run engine.

pub mod runner;
