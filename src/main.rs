fn main() {
    if let Err(err) = kanban_client_lib::run() {
        eprintln!("kanban-client: {err}");
        std::process::exit(1);
    }
}
