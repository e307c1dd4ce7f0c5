use iobench::service::Flavor;

fn main() {
    if let Err(e) = iobench::server::main::run(Flavor::Threaded) {
        tracing::error!("threaded server error: {:#}", e);
        std::process::exit(1);
    }
}
