fn main() {
    feedback_board_lib::run()
}
