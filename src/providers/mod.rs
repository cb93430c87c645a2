pub mod grand_exchange;

pub use grand_exchange::GrandExchangeClient;
