fn main() -> anyhow::Result<()> {
    extern crate snapgrab;

    snapgrab::desktop_main()
}
