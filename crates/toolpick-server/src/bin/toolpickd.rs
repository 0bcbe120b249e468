use std::io;

use toolpick_server::GameServer;

fn main() -> io::Result<()> {
    let mode = std::env::var("TOOLPICK_TRANSPORT").unwrap_or_else(|_| "stdio".to_string());
    let server = GameServer::new();
    match mode.as_str() {
        "stdio" => server.serve_stdio(),
        "http" => {
            let addr = std::env::var("TOOLPICK_HTTP_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8790".to_string());
            server.serve_http(&addr)
        }
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "TOOLPICK_TRANSPORT must be stdio or http",
        )),
    }
}
