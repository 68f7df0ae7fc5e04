/// Install the default tracing subscriber for hosts that have none.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("info,kiln_core=debug,kiln_assets=debug")
        .init();
}
