fn main() {
    mc_cli::run();
}
