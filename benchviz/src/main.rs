fn main() -> anyhow::Result<()> {
    benchviz::run()
}
