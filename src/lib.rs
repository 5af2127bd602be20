pub mod net;
pub mod sim;
pub mod stream;
pub mod tcp;
pub mod wire;

#[cfg(test)]
mod test;
