fn main() {
    imgdrop::run();
}
