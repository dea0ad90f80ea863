fn main() {
    shark_desktop_lib::run()
}
