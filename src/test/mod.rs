mod network_interface;
mod tcp_receiver;
mod transfer;
