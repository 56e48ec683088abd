pub mod codal;
