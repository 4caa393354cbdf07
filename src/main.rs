fn main() {
    if let Err(err) = changeset_graph::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
