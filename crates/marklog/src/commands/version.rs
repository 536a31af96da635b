pub fn run() -> anyhow::Result<()> {
    println!("marklog {}", env!("CARGO_PKG_VERSION"));
    println!("Markup lifecycle tracking for annotation sessions");
    Ok(())
}
