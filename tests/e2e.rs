//! End-to-end tests against the real wsl.exe / netsh.exe
//! Run with: cargo test --test e2e -- --ignored (Windows host, elevated shell for portproxy)
//! Set PORTOS_E2E_DISTRO to an installed WSL2 distribution.

use portos::{DesiredConfiguration, DistroSettings, Portos, PortosConfig};

const PROBE_PORT: u16 = 47_123;

fn portos() -> Portos {
    Portos::new(PortosConfig::default()).unwrap()
}

fn distro() -> String {
    std::env::var("PORTOS_E2E_DISTRO").unwrap_or_else(|_| "Ubuntu".to_string())
}

#[tokio::test]
#[ignore] // Run manually: cargo test --test e2e -- --ignored
async fn test_list_distributions() {
    let distros = portos().list_distributions().await.unwrap();
    assert!(!distros.is_empty());
    assert!(distros.iter().all(|d| !d.name.starts_with("docker-desktop")));
}

#[tokio::test]
#[ignore]
async fn test_start_and_describe() {
    let portos = portos();
    let name = distro();

    portos.start_distribution(&name).await.unwrap();

    let distros = portos.list_distributions().await.unwrap();
    let d = distros.iter().find(|d| d.name == name).unwrap();
    assert!(d.is_running());
    assert!(d.kernel_version.is_some());
    println!("{:#?}", d);
}

#[tokio::test]
#[ignore]
async fn test_map_and_unmap_probe_port() {
    let portos = portos();
    let name = distro();
    portos.start_distribution(&name).await.unwrap();

    let mut settings = DistroSettings::builder().port(PROBE_PORT).build();
    let report = portos
        .map_ports(&DesiredConfiguration::new().with(&name, settings.clone()))
        .await
        .unwrap();
    assert!(report.failed.is_empty(), "{:?}", report.failed);

    let d = portos
        .list_distributions()
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.name == name)
        .unwrap();
    let ip = d.ip.unwrap().to_string();
    assert!(portos.proxies().await.unwrap().contains(&ip, PROBE_PORT));

    settings.ports.clear();
    portos
        .map_ports(&DesiredConfiguration::new().with(&name, settings))
        .await
        .unwrap();
    assert!(!portos.proxies().await.unwrap().contains(&ip, PROBE_PORT));
}

#[tokio::test]
#[ignore]
async fn test_missing_distribution() {
    let err = portos()
        .terminate_distribution("portos-does-not-exist")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
