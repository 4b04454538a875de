fn main() -> Result<(), Box<dyn std::error::Error>> {
    chatgauge::cli::main()
}
