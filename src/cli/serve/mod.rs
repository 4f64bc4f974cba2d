//! Development server.
//!
//! Request order:
//!
//! ```text
//! DevBridge (await generation, sprite sheets) → virtual stylesheet → public/ → 404
//! ```

mod lifecycle;
mod path;
pub(crate) mod response;

use crate::{
    bridge::{
        dev::{DevBridge, Handled},
        module::{ModuleBridge, module_url, strip_base},
    },
    config::SpriteConfig,
    log, logger,
    sprite::SpriteLoader,
    utils::{mime::types::CSS, path::request_path},
};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tiny_http::{Request, Server};
use tokio::runtime::Handle;

/// Worker threads answering requests (each may block on a generation).
const REQUEST_THREADS: usize = 4;

/// Everything a request thread needs.
pub struct ServeContext {
    dev: DevBridge,
    module: ModuleBridge,
    runtime: Handle,
    base: String,
    public: PathBuf,
}

impl ServeContext {
    pub fn new(config: &SpriteConfig, loader: SpriteLoader, runtime: Handle) -> Self {
        let options = config.sprite_options();
        Self {
            dev: DevBridge::new(loader.clone(), runtime.clone(), &options),
            module: ModuleBridge::new(loader),
            runtime,
            base: options.base,
            public: config.serve.public.clone(),
        }
    }
}

/// Run `sprite2css serve` until Ctrl+C.
pub fn serve(config: &SpriteConfig) -> Result<()> {
    let runtime = super::runtime()?;
    let loader = config.sprite_loader();

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    if config.hmr {
        lifecycle::spawn_watcher(
            runtime.handle(),
            config.source_dirs(),
            loader.clone(),
            shutdown_rx,
        )?;
    }

    log!("serve"; "http://{}", addr);
    log!("serve"; "stylesheet at http://{}{}", addr, module_url(&config.base));

    // Start the first generation before the first request arrives
    let warm = loader.clone();
    runtime.spawn(async move {
        match warm.load().await {
            Ok(sprites) => logger::status_success(&format!(
                "{} sheet(s), {} rule(s)",
                sprites.image_count(),
                sprites.rules().len()
            )),
            Err(e) => logger::status_error("sprite generation failed", &e.to_string()),
        }
    });

    let ctx = Arc::new(ServeContext::new(config, loader, runtime.handle().clone()));
    run_request_loop(&server, ctx)?;

    runtime.shutdown_timeout(Duration::from_secs(2));
    Ok(())
}

/// Serve requests until the server is unblocked.
pub fn run_request_loop(server: &Server, ctx: Arc<ServeContext>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx) {
                log!("serve"; "request error: {e}");
            }
        });
    }

    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let request = match ctx.dev.intercept(request)? {
        Handled::Done => return Ok(()),
        Handled::Next(request) => request,
    };

    let path = request_path(request.url());

    let module_id = strip_base(&ctx.base, &path).and_then(|rest| ctx.module.resolve_id(rest));
    if let Some(id) = module_id {
        return match ctx.runtime.block_on(ctx.module.load(id)) {
            Some(Ok(css)) => response::respond_bytes(request, CSS, css.into_bytes()),
            Some(Err(e)) => response::respond_error(request, &anyhow::Error::new(e)),
            None => response::respond_not_found(request),
        };
    }

    if let Some(file) = path::resolve_path(&path, &ctx.public) {
        return response::respond_file(request, &file);
    }

    response::respond_not_found(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::test_support::write_png;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use tempfile::TempDir;

    struct TestServer {
        server: Arc<Server>,
        addr: SocketAddr,
        thread: Option<std::thread::JoinHandle<()>>,
        loader: SpriteLoader,
        runtime: tokio::runtime::Runtime,
    }

    impl TestServer {
        fn start(config: &SpriteConfig) -> Self {
            let runtime = crate::cli::runtime().unwrap();
            let loader = config.sprite_loader();
            let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
            let addr = server.server_addr().to_ip().unwrap();

            let ctx = Arc::new(ServeContext::new(
                config,
                loader.clone(),
                runtime.handle().clone(),
            ));
            let loop_server = Arc::clone(&server);
            let thread = std::thread::spawn(move || {
                run_request_loop(&loop_server, ctx).unwrap();
            });

            Self {
                server,
                addr,
                thread: Some(thread),
                loader,
                runtime,
            }
        }

        /// Raw HTTP/1.1 request; returns (status, body).
        fn request(&self, method: &str, path: &str) -> (u16, Vec<u8>) {
            let mut stream = TcpStream::connect(self.addr).unwrap();
            write!(
                stream,
                "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
            )
            .unwrap();

            let mut raw = Vec::new();
            stream.read_to_end(&mut raw).unwrap();

            let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
            let head = String::from_utf8_lossy(&raw[..split]).into_owned();
            let status = head.split(' ').nth(1).unwrap().parse().unwrap();
            (status, raw[split + 4..].to_vec())
        }

        fn get(&self, path: &str) -> (u16, Vec<u8>) {
            self.request("GET", path)
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            self.server.unblock();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }

    fn site(base: &str) -> (TempDir, SpriteConfig) {
        let dir = TempDir::new().unwrap();
        let root = crate::utils::path::normalize_path(dir.path());
        write_png(&root.join("icons/a.png"), 8, 8);
        write_png(&root.join("icons/b.png"), 4, 4);
        fs::create_dir_all(root.join("public")).unwrap();
        fs::write(root.join("public/index.html"), "<h1>home</h1>").unwrap();

        let mut config = SpriteConfig::from_str(&format!(
            "base = \"{base}\"\n[[entries]]\nsource = \"icons\"\n"
        ))
        .unwrap();
        config.root = root.clone();
        for entry in &mut config.entries {
            entry.resolve_source(&root);
        }
        config.serve.public = root.join("public");
        (dir, config)
    }

    #[test]
    fn test_serves_sprites_css_and_static() {
        let (_dir, config) = site("/");
        let server = TestServer::start(&config);

        let sprites = server.runtime.block_on(async { server.loader.load().await }).unwrap();
        let (path, bytes) = sprites.images()[0];

        let (status, body) = server.get(&format!("{path}?v=1"));
        assert_eq!(status, 200);
        assert_eq!(body, bytes);

        let (status, body) = server.request("HEAD", path);
        assert_eq!(status, 200);
        assert!(body.is_empty());

        let (status, body) = server.get("/@sprite2css/sprite.css");
        assert_eq!(status, 200);
        assert_eq!(String::from_utf8(body).unwrap(), sprites.css());

        let (status, body) = server.get("/virtual:@sprite2css/sprite.css");
        assert_eq!(status, 200);
        assert_eq!(String::from_utf8(body).unwrap(), sprites.css());

        let (status, body) = server.get("/");
        assert_eq!(status, 200);
        assert_eq!(body, b"<h1>home</h1>");

        let (status, _) = server.get("/assets/images/sprite2css/missing.png");
        assert_eq!(status, 404);
    }

    #[test]
    fn test_base_prefix_routes() {
        let (_dir, config) = site("/app/");
        let server = TestServer::start(&config);

        let sprites = server.runtime.block_on(async { server.loader.load().await }).unwrap();
        let (path, bytes) = sprites.images()[0];
        assert!(path.starts_with("/assets/"));

        let (status, body) = server.get(&format!("/app{path}"));
        assert_eq!(status, 200);
        assert_eq!(body, bytes);

        // Unprefixed path falls through to public/ and misses
        let (status, _) = server.get(path);
        assert_eq!(status, 404);

        let (status, _) = server.get("/app/@sprite2css/sprite.css");
        assert_eq!(status, 200);

        let (status, _) = server.get("/app/virtual:@sprite2css/sprite.css");
        assert_eq!(status, 200);

        let (status, _) = server.get("/@sprite2css/sprite.css");
        assert_eq!(status, 404);
    }

    #[test]
    fn test_load_failure_answers_500_and_recovers() {
        let (dir, config) = site("/");
        let broken = dir.path().join("icons/broken.png");
        fs::write(&broken, b"not a png").unwrap();

        let server = TestServer::start(&config);

        let (status, body) = server.get("/");
        assert_eq!(status, 500);
        assert!(String::from_utf8_lossy(&body).contains("failed to decode image"));

        // Server keeps running; fix the source and regenerate
        fs::remove_file(&broken).unwrap();
        server.runtime.block_on(server.loader.reset());

        let (status, _) = server.get("/");
        assert_eq!(status, 200);
    }
}
