pub mod todo;

pub use todo::{NewTodo, NewTodoRequest, Todo, TodoChanges, UpdateTodoRequest};
