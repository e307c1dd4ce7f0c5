use iobench::service::Flavor;

fn main() {
    if let Err(e) = iobench::server::main::run(Flavor::Pooled) {
        tracing::error!("pooled server error: {:#}", e);
        std::process::exit(1);
    }
}
