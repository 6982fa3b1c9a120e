pub mod messaging;
pub mod websocket;

#[cfg(test)]
pub mod testing;
