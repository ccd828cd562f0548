pub mod test_instructions;
pub mod test_ports;
