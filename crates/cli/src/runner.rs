// runner.rs
use anyhow::{anyhow, Context, Result};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use bugscan_common::{ScanConfig, ScanMode, ScanStats, DEFAULT_ISP_REDIRECTS};
use bugscan_orchestrator::{DirectClassifier, Orchestrator, TaskList};
use bugscan_scanner_http::HttpTransport;
use bugscan_target_resolver::{parse_host_lines, TargetResolver, TargetSource};
use crate::args::Cli;
use crate::output::build_sink;

pub async fn run_scan(cli: Cli) -> Result<ScanStats> {
    let config = build_config(&cli).await?;
    let source = target_source(&cli)?;

    info!("Starting scan...");
    info!("Source: {:?}", source);
    info!("Mode: {}", config.mode);
    info!("Methods: {}", config.methods.join(","));
    info!("Ports: {}", cli.ports);
    info!("Threads: {}", config.threads);
    if let Some(proxy) = &config.proxy {
        info!("Proxy: {}", proxy);
    }

    let hosts = TargetResolver::expand(&source).await?;
    if hosts.is_empty() {
        warn!("No hosts to scan");
    }
    let host_count = hosts.len();
    let tasks = TaskList::new(config.methods.clone(), hosts, config.ports.clone());
    info!(
        "Total probes: {} ({} methods × {} hosts × {} ports)",
        tasks.total(),
        config.methods.len(),
        host_count,
        config.ports.len()
    );

    let transport = HttpTransport::from_config(&config)?;
    let classifier = DirectClassifier::new(config.isp_redirects.iter().cloned());
    let sink = build_sink(config.output.as_deref(), cli.format)?;

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, waiting for in-flight probes...");
            cancel_for_signal.cancel();
        }
    });

    let orchestrator = Orchestrator::new(config.threads, Arc::new(transport), Arc::new(classifier), sink)
        .with_request_timeout(config.timeout)
        .with_cancellation(cancel);

    orchestrator.run(tasks).await
}

/// Build the immutable scan configuration from parsed arguments.
pub async fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let mode: ScanMode = cli.mode.parse()?;
    let methods = parse_methods(&cli.methods)?;
    let ports = parse_ports(&cli.ports)?;

    let mut isp_redirects: Vec<String> = if cli.no_default_isp_redirects {
        Vec::new()
    } else {
        DEFAULT_ISP_REDIRECTS.iter().map(|s| s.to_string()).collect()
    };
    if let Some(path) = &cli.isp_redirects_file {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read ISP redirect list {}", path.display()))?;
        isp_redirects.extend(parse_host_lines(&content));
    }
    isp_redirects.extend(cli.isp_redirects.iter().map(|s| s.trim().to_string()));

    let config = ScanConfig::new()
        .with_mode(mode)
        .with_threads(cli.threads)
        .with_methods(methods)
        .with_ports(ports)
        .with_proxy(cli.proxy.clone())
        .with_output(cli.output.clone())
        .with_timeout(Duration::from_millis(cli.timeout))
        .with_uri(cli.uri.clone())
        .with_isp_redirects(isp_redirects);
    config.validate()?;
    Ok(config)
}

/// The host file wins when both a file and a CIDR block are given.
fn target_source(cli: &Cli) -> Result<TargetSource> {
    if let Some(path) = &cli.filename {
        Ok(TargetSource::File(path.clone()))
    } else if let Some(cidr) = &cli.cdir {
        Ok(TargetSource::Cidr(cidr.clone()))
    } else {
        Err(anyhow!("Either a host file (-f) or a CIDR block (-c) is required"))
    }
}

/// Parses a comma-separated method list like "head,get"
fn parse_methods(methods_str: &str) -> Result<Vec<String>> {
    let methods: Vec<String> = methods_str
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    if methods.is_empty() {
        Err(anyhow!("No methods specified"))
    } else {
        Ok(methods)
    }
}

/// Parses a port string like "80,443,1000-1010" into a vector of u16 ports
fn parse_ports(ports_str: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();

    for part in ports_str.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.contains('-') {
            let range: Vec<&str> = part.split('-').collect();
            if range.len() != 2 {
                return Err(anyhow!("Invalid port range: {}", part));
            }

            let start: u16 = range[0].parse().context(format!("Invalid start port: {}", range[0]))?;
            let end: u16 = range[1].parse().context(format!("Invalid end port: {}", range[1]))?;

            if start == 0 || start > end {
                return Err(anyhow!("Invalid range: {}", part));
            }

            ports.extend(start..=end);
        } else {
            let port: u16 = part.parse().context(format!("Invalid port: {}", part))?;
            if port == 0 {
                return Err(anyhow!("Invalid port: {}", part));
            }
            ports.push(port);
        }
    }

    if ports.is_empty() {
        Err(anyhow!("No ports specified"))
    } else {
        Ok(ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["bugscan"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_ports_keeps_order_and_duplicates() {
        let ports = parse_ports("8080,80,80").unwrap();
        assert_eq!(ports, vec![8080, 80, 80]);
    }

    #[test]
    fn test_parse_ports_range() {
        let ports = parse_ports("22,80-82,443").unwrap();
        assert_eq!(ports, vec![22, 80, 81, 82, 443]);
    }

    #[test]
    fn test_parse_ports_whitespace() {
        let ports = parse_ports(" 80 , 443 ").unwrap();
        assert_eq!(ports, vec![80, 443]);
    }

    #[test]
    fn test_parse_ports_invalid() {
        assert!(parse_ports("").is_err());
        assert!(parse_ports(",,,").is_err());
        assert!(parse_ports("abc").is_err());
        assert!(parse_ports("0").is_err());
        assert!(parse_ports("80-").is_err());
        assert!(parse_ports("90-80").is_err());
        assert!(parse_ports("70000").is_err());
    }

    #[test]
    fn test_parse_methods() {
        assert_eq!(parse_methods("head, get").unwrap(), vec!["head", "get"]);
        assert!(parse_methods(" , ").is_err());
    }

    #[test]
    fn test_target_source_prefers_file() {
        let c = cli(&["-f", "hosts.txt", "-c", "10.0.0.0/24"]);
        assert_eq!(target_source(&c).unwrap(), TargetSource::File("hosts.txt".into()));
        let c = cli(&["-c", "10.0.0.0/24"]);
        assert_eq!(target_source(&c).unwrap(), TargetSource::Cidr("10.0.0.0/24".into()));
    }

    #[tokio::test]
    async fn test_build_config_defaults() {
        let config = build_config(&cli(&["-f", "hosts.txt"])).await.unwrap();
        assert_eq!(config.threads, 25);
        assert_eq!(config.methods, vec!["head"]);
        assert_eq!(config.ports, vec![80]);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.isp_redirects.len(), DEFAULT_ISP_REDIRECTS.len());
    }

    #[tokio::test]
    async fn test_build_config_rejects_bad_values() {
        assert!(build_config(&cli(&["-f", "h", "-T", "0"])).await.is_err());
        assert!(build_config(&cli(&["-f", "h", "-M", "g e t"])).await.is_err());
        assert!(build_config(&cli(&["-f", "h", "--timeout", "0"])).await.is_err());
    }

    #[tokio::test]
    async fn test_build_config_isp_redirects() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http://10.1.1.1/zero\n\nhttp://captive.example/").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = build_config(&cli(&[
            "-f",
            "h",
            "--no-default-isp-redirects",
            "--isp-redirects-file",
            path.as_str(),
            "--isp-redirect",
            "http://extra.example",
        ]))
        .await
        .unwrap();
        assert_eq!(
            config.isp_redirects,
            vec!["http://10.1.1.1/zero", "http://captive.example/", "http://extra.example"]
        );
    }

    #[tokio::test]
    async fn test_run_scan_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    let _ = stream
                        .write_all(b"HTTP/1.1 200 OK\r\nServer: test-server\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        let mut hosts = tempfile::NamedTempFile::new().unwrap();
        writeln!(hosts, "127.0.0.1").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("found.txt");
        let port_arg = port.to_string();

        let stats = run_scan(cli(&[
            "-f",
            hosts.path().to_str().unwrap(),
            "-M",
            "head,get",
            "-p",
            port_arg.as_str(),
            "-o",
            out.to_str().unwrap(),
            "--timeout",
            "2000",
        ]))
        .await
        .unwrap();

        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.reported, 2);
        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains("test-server") && l.ends_with("127.0.0.1")));
        assert!(lines.iter().any(|l| l.starts_with("HEAD")));
        assert!(lines.iter().any(|l| l.starts_with("GET")));
    }
}
