fn main() {
    plate_pipeline::cli::run();
}
