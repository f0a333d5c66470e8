fn main() -> anyhow::Result<()> {
    mlsa_rebuild::run()
}
