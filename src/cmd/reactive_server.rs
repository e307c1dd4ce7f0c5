use iobench::service::Flavor;

fn main() {
    if let Err(e) = iobench::server::main::run(Flavor::Reactive) {
        tracing::error!("reactive server error: {:#}", e);
        std::process::exit(1);
    }
}
